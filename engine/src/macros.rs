#![macro_use]

/// Time a block and report the elapsed duration through tracing.
///
/// `profile!("label", expr)` reports at TRACE under the `profile` scope.
/// `profile!(scope: "teleport", level: DEBUG, "label", expr)` picks both.
#[macro_export]
macro_rules! profile {
    (scope: $scope:expr, level: $level:ident, $description:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        $crate::scoped_log!($level, $scope, "[{}]: Time elapsed: {:?}", $description, duration);
        result
    }};
    ($description:expr, $block:expr) => {
        $crate::profile!(scope: "profile", level: TRACE, $description, $block)
    };
}
