//! Time-bounded claims on a shared, finite resource: on-screen line
//! positions (C5) and palette slots (C6).
pub mod line;
pub mod palette;
