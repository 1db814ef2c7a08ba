//! Logging facade.
//!
//! Every other module logs through these macros instead of depending on
//! the `log` crate directly, so a future alternate backend only needs to
//! change this one file.

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { ::log::error!($($arg)*); };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { ::log::warn!($($arg)*); };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { ::log::info!($($arg)*); };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { ::log::debug!($($arg)*); };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { ::log::trace!($($arg)*); };
}
