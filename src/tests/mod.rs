//! Test modules for the kayak report binary.
