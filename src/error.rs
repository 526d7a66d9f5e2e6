/*!

Errors returned while building a simulation.

Errors are meant for conditions the user can fix, such as a badly written configuration. Violations of the router invariants are not errors but panics, since they reveal a defect in the model.

Errors are built with the `error!` macro, which records the source location in which they were generated.
```ignore
return Err(error!(ill_formed_configuration,cv.clone()).with_message(format!("bad value for buffer_size")));
```

*/

use std::fmt::{self,Display,Formatter};

use crate::config::ConfigurationValue;

///A place in the source code of this crate.
#[derive(Debug,Clone,PartialEq)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
	pub column: u32,
}

impl Display for SourceLocation
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		write!(formatter,"{}:{}:{}",self.file,self.line,self.column)
	}
}

///Expands into the `SourceLocation` of its invocation.
#[macro_export]
macro_rules! source_location{
	() => {
		$crate::error::SourceLocation{
			file: file!(),
			line: line!(),
			column: column!(),
		}
	};
}

///Build an `Error` of the given kind, capturing the current source location.
///`error!(ill_formed_configuration,cv)` is `Error::ill_formed_configuration(source_location!(),cv)`.
#[macro_export]
macro_rules! error{
	($kind:ident) => {
		$crate::error::Error::$kind( $crate::source_location!() )
	};
	($kind:ident, $($args:expr),* ) => {
		$crate::error::Error::$kind( $crate::source_location!(), $($args),* )
	};
}

#[derive(Debug,Clone,PartialEq)]
pub enum ErrorKind
{
	///The configuration does not describe a valid object. Contains the offending value.
	IllFormedConfiguration(ConfigurationValue),
	///Some argument of a function is not valid.
	BadArgument,
	///The traffic was asked for a message it cannot build.
	TrafficError,
}

#[derive(Debug,Clone,PartialEq)]
pub struct Error
{
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	pub message: Option<String>,
}

impl Error
{
	pub fn new(source_location:SourceLocation, kind:ErrorKind) -> Error
	{
		Error{
			source_location,
			kind,
			message: None,
		}
	}
	pub fn with_message(mut self, message:String) -> Error
	{
		self.message = Some(message);
		self
	}
	pub fn ill_formed_configuration(source_location:SourceLocation, value:ConfigurationValue) -> Error
	{
		Error::new(source_location,ErrorKind::IllFormedConfiguration(value))
	}
	pub fn bad_argument(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::BadArgument)
	}
	pub fn traffic_error(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::TrafficError)
	}
}

impl Display for Error
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		match &self.kind
		{
			ErrorKind::IllFormedConfiguration(value) => write!(formatter,"ill formed configuration {}",value)?,
			ErrorKind::BadArgument => write!(formatter,"bad argument")?,
			ErrorKind::TrafficError => write!(formatter,"traffic error")?,
		}
		if let Some(message) = &self.message
		{
			write!(formatter,": {}",message)?;
		}
		write!(formatter," (at {})",self.source_location)
	}
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn message_and_location()
	{
		let error = error!(bad_argument).with_message("no ports".to_string());
		assert_eq!(error.kind,ErrorKind::BadArgument);
		assert_eq!(error.message.as_deref(),Some("no ports"));
		assert!(error.source_location.file.ends_with("error.rs"));
		let text = format!("{}",error);
		assert!(text.starts_with("bad argument: no ports (at "));
	}
}
