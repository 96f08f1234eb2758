//! Behavior tests across the binary's control loop and the library modules
//! it wires together.
