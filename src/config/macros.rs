/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` declares a configuration structure with its defaults inline:
/// field name, type and default value in one place. It generates
/// - the struct with public fields
/// - the `Default` implementation
/// - serde support with `#[serde(default)]`, so partial TOML files are valid
///
/// # Example
/// ```
/// dashhub::config_struct! {
///     pub struct CacheSettings {
///         default_ttl_secs: u64 = 300,
///         sweep_interval_secs: u64 = 60,
///     }
/// }
///
/// let settings = CacheSettings::default();
/// assert_eq!(settings.default_ttl_secs, 300);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
