/// Convenience macro for scoped logging at different levels.
///
/// The level is a `tracing::Level` constant name (`ERROR`, `WARN`, `INFO`,
/// `DEBUG`, `TRACE`); the event is dropped unless the scope allows it.
#[macro_export]
macro_rules! scoped_log {
    ($level:ident, $scope:expr, $($arg:tt)*) => {{
        let log_config = $crate::logging::get_log_config();
        if log_config.should_log($scope, $crate::logging::Level::$level) {
            $crate::logging::tracing::event!(
                $crate::logging::Level::$level,
                scope = $scope,
                $($arg)*
            );
        }
    }};
}

// Convenience macros for common scopes
#[macro_export]
macro_rules! teleport_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "teleport", $($arg)*)
    };
}

#[macro_export]
macro_rules! climb_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "climb", $($arg)*)
    };
}

#[macro_export]
macro_rules! comfort_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "comfort", $($arg)*)
    };
}

#[macro_export]
macro_rules! physics_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "physics", $($arg)*)
    };
}

#[macro_export]
macro_rules! game_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "game", $($arg)*)
    };
}

#[macro_export]
macro_rules! input_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "input", $($arg)*)
    };
}
