#[macro_export]
/// A helper macro to get the last item in the [crate::bail_error] macro, which will be the error message.
macro_rules! last {
  ([$single:tt] $($rest:tt)*) => {
    $single
  };
  ([$first:tt $($rest:tt)*] $($reversed:tt)*) => {
    $crate::last!([$($rest)*] $first $($reversed)*)
  };
}

#[macro_export]
/// Log an error with structured details, then return the message as an [anyhow::Error].
///
/// # Example
/// ```
/// use ocifn_library::bail_error;
///
/// fn fails() -> anyhow::Result<()> {
///   let tid = "test".to_string();
///   bail_error!(tid=%tid, "Could not read private key");
/// }
/// assert_eq!(fails().err().unwrap().to_string(), "Could not read private key");
/// ```
macro_rules! bail_error {
  ($($arg:tt)+) => {
    {
      tracing::error!($($arg)+);
      anyhow::bail!($crate::last!([$($arg)+]))
    }
  };
}

#[macro_export]
/// Log an error with structured details, then return `$err` from the enclosing function.
/// The error value is converted with [Into], so any typed error the caller returns works.
///
/// # Example
/// ```
/// use ocifn_library::bail_typed;
///
/// #[derive(Debug, PartialEq)]
/// struct Missing(String);
///
/// fn lookup(name: &str) -> Result<(), Missing> {
///   bail_typed!(Missing(name.to_string()), name=%name, "Name did not resolve");
/// }
/// assert_eq!(lookup("dev"), Err(Missing("dev".to_string())));
/// ```
macro_rules! bail_typed {
  ($err:expr, $($arg:tt)+) => {
    {
      tracing::error!($($arg)+);
      return Err($err.into());
    }
  };
}
