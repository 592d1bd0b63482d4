/// Builds a [`Dict`](crate::value::Dict), converting keys and values with
/// `Into`.
///
/// ```rust
/// use prism::dict;
/// use prism::value::Value;
///
/// let dict = dict!["title" => "Hello", "weight" => 3, "draft" => false];
/// assert_eq!(dict["weight"], Value::from(3));
/// assert_eq!(dict.len(), 3);
/// ```
#[macro_export]
macro_rules! dict {
    ($($key:expr => $value:expr),* $(,)?) => ({
        #[allow(unused_mut)]
        let mut dict: $crate::value::Dict = $crate::value::Dict::new();
        $(dict.insert($key.into(), $value.into());)*
        dict
    });
}

pub use dict;
