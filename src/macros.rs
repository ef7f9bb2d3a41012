pub use enclose::*;

/// Builds a listener closure, cloning the listed captures into it.
///
/// ```ignore
/// state.add_listener(&owner, listener!((hits) => {
///     hits.fetch_add(1, Ordering::SeqCst);
/// }));
/// ```
#[macro_export]
macro_rules! listener {
    (( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::macros::enclose!(($( $d_tt )*) move || { $($b)* })
    };
    (=> $($b:tt)*) => {
        move || { $($b)* }
    };
}
