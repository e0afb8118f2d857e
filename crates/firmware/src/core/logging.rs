//! Logging abstraction
//!
//! Provides unified logging macros that work across different targets:
//! - Embedded (pico2_w): Uses defmt over RTT
//! - Host tests: Uses println!
//! - Host non-test: No-op (arguments are still type-checked)
//!
//! None of these may be called from the PPM alarm interrupt or the frame
//! receive path.

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "pico2_w")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "pico2_w"), test))]
        println!("[INFO] {}", format!($($arg)*));

        #[cfg(all(not(feature = "pico2_w"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "pico2_w")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "pico2_w"), test))]
        println!("[WARN] {}", format!($($arg)*));

        #[cfg(all(not(feature = "pico2_w"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "pico2_w")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "pico2_w"), test))]
        eprintln!("[ERROR] {}", format!($($arg)*));

        #[cfg(all(not(feature = "pico2_w"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "pico2_w")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "pico2_w"), test))]
        println!("[DEBUG] {}", format!($($arg)*));

        #[cfg(all(not(feature = "pico2_w"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_on_host() {
        let port = 4210u16;
        crate::log_info!("radio listening on port {}", port);
        crate::log_warn!("session {} refused", 3);
        crate::log_error!("network init failed");
        crate::log_debug!("frame {:?}", [1500u16; 2]);
    }
}
