/// Construct a map [`Value`][crate::Value] from a JSON-like literal.
///
/// The outer braces are implied. Values may be nested maps `{ ... }`, lists
/// `[ ... ]`, `None`, or any expression with a `From` conversion into a
/// `Value`.
///
/// ```
/// let v = pugvm::value! {
///     user: { name: "John", admin: false },
///     tags: ["a", "b"],
///     age: 20 + 3,
/// };
/// ```
#[macro_export]
macro_rules! value {
    ($($tt:tt)*) => {
        $crate::_value!({ $($tt)* })
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value {
    //////////////////////////////////////////////////////////////////////////
    // TT muncher for the inside of a list [...].
    //
    // Must be invoked as: _value!(@list [] $($tt)*)
    //////////////////////////////////////////////////////////////////////////

    (@list [$($elems:expr,)*]) => {
        ::std::vec![$($elems,)*]
    };

    // Stray comma, e.g. `[,]`.
    (@list [$($elems:expr,)*] , $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)*] $($rest)*)
    };

    (@list [$($elems:expr,)*] None $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::None,] $($($rest)*)?)
    };

    (@list [$($elems:expr,)*] [$($list:tt)*] $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!([$($list)*]),] $($($rest)*)?)
    };

    (@list [$($elems:expr,)*] {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!({$($map)*}),] $($($rest)*)?)
    };

    (@list [$($elems:expr,)*] $next:expr $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::from($next),] $($($rest)*)?)
    };

    //////////////////////////////////////////////////////////////////////////
    // TT muncher for the inside of a map {...}. Each entry is inserted into
    // the given map variable.
    //
    // Must be invoked as: _value!(@map $map $($tt)*)
    //////////////////////////////////////////////////////////////////////////

    (@map $map:ident) => {};

    (@map $map:ident , $($rest:tt)*) => {
        $crate::_value!(@map $map $($rest)*);
    };

    (@map $map:ident $key:ident : None $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::Value::None);
        $crate::_value!(@map $map $($($rest)*)?);
    };

    (@map $map:ident $key:ident : [$($list:tt)*] $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::_value!([$($list)*]));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    (@map $map:ident $key:ident : {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::_value!({$($inner)*}));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    (@map $map:ident $key:ident : $value:expr $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::Value::from($value));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    //////////////////////////////////////////////////////////////////////////
    // The main implementation.
    //////////////////////////////////////////////////////////////////////////

    (None) => {
        $crate::Value::None
    };

    ([$($tt:tt)*]) => {
        $crate::Value::List($crate::_value!(@list [] $($tt)*))
    };

    ({$($tt:tt)*}) => {
        $crate::Value::Map({
            #[allow(unused_mut)]
            let mut map = $crate::Map::new();
            $crate::_value!(@map map $($tt)*);
            map
        })
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
