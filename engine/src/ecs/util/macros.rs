/// Invoke a macro once per tuple length, peeling one type parameter off the front each time.
#[macro_export]
#[doc(hidden)]
macro_rules! for_every_tuple {
    ($m:ident !! $head_ty:ident) => {
        $m!($head_ty);
    };
    ($m:ident !! $head_ty:ident, $($tail_ty:ident),*) => (
        $m!($head_ty, $( $tail_ty ),*);
        $crate::for_every_tuple!($m !! $( $tail_ty ),*);
    );
}

/// Apply a macro to tuples of one up to twelve elements.
///
/// Twelve matches the largest tuple the standard library implements its own traits for.
#[macro_export]
#[doc(hidden)]
macro_rules! all_tuples {
    ($m:ident) => {
        $crate::for_every_tuple!($m !! A, B, C, D, E, F, G, H, I, J, K, L);
    };
}
