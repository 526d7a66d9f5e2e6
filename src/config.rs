/*!

The configuration values from which routers, links, interfaces and whole simulations are built.

A configuration is a tree of [ConfigurationValue]. Objects are written `Name { key1 : value1, key2 : value2 }`,
arrays `[value1, value2]`, numbers are stored as `f64`, and booleans as `true` and `false`.
For example, the parameters shared by every router of a network are given as
```ignore
RouterParameters
{
	virtual_networks: 2,
	vcs_per_class: 4,
	buffer_size: 4,
	pipeline_stages: 2,
	ordered_virtual_networks: [true, false],
}
```

Builders walk the fields of an object with [match_object!] or [match_object_panic!].

*/

use std::fmt::{self,Display,Formatter};

use crate::error;
use crate::error::*;
use crate::event::Time;

#[derive(Debug,Clone,PartialEq)]
pub enum ConfigurationValue
{
	Literal(String),
	Number(f64),
	Object(String,Vec<(String,ConfigurationValue)>),
	Array(Vec<ConfigurationValue>),
	True,
	False,
	None,
}

impl Display for ConfigurationValue
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		match self
		{
			ConfigurationValue::Literal(s) => write!(formatter,"\"{}\"",s),
			ConfigurationValue::Number(x) => write!(formatter,"{}",x),
			ConfigurationValue::Object(name,pairs) =>
			{
				if pairs.is_empty()
				{
					return write!(formatter,"{}",name);
				}
				write!(formatter,"{}{{",name)?;
				for (index,(key,value)) in pairs.iter().enumerate()
				{
					if index>0
					{
						write!(formatter,",")?;
					}
					write!(formatter,"{}:{}",key,value)?;
				}
				write!(formatter,"}}")
			},
			ConfigurationValue::Array(list) =>
			{
				write!(formatter,"[")?;
				for (index,value) in list.iter().enumerate()
				{
					if index>0
					{
						write!(formatter,",")?;
					}
					write!(formatter,"{}",value)?;
				}
				write!(formatter,"]")
			},
			ConfigurationValue::True => write!(formatter,"true"),
			ConfigurationValue::False => write!(formatter,"false"),
			ConfigurationValue::None => write!(formatter,"None"),
		}
	}
}

/// match arms against the keys of an object
/// first argument, `$cv:expr`, is the ConfigurationValue expected to be the object
/// second argument, `$name:literal`, is the name the Object should have.
/// third argument, `$valueid:ident`, is the variable name capturing the value in the object's elements
///    and can be used in the arms
/// the remaining arguments are the arms of the match.
/// Errors are returned from the enclosing function, which must return a `Result<_,Error>`.
#[macro_export]
macro_rules! match_object{
	($cv:expr, $name:literal, $valueid:ident, $($arm:tt)* ) => {{
		$crate::match_object!($cv,[$name],$valueid,$($arm)*)
	}};
	($cv:expr, $names:expr, $valueid:ident, $($arm:tt)* ) => {{
		if let &$crate::config::ConfigurationValue::Object(ref cv_name, ref cv_pairs) = $cv
		{
			if !$names.iter().any(|&x|x==cv_name)
			{
				return Err($crate::error!(ill_formed_configuration,$cv.clone()).with_message(format!("Trying to create a {} from a `{}` object",$names[0],cv_name)));
			}
			for &(ref name,ref $valueid) in cv_pairs
			{
				match AsRef::<str>::as_ref(&name)
				{
					$( $arm )*
					"legend_name" => (),
					_ => return Err($crate::error!(ill_formed_configuration,$cv.clone()).with_message(format!("Nothing to do with field {} in {}",name,$names[0]))),
				}
			}
		}
		else
		{
			return Err($crate::error!(ill_formed_configuration,$cv.clone()).with_message(format!("Trying to create a {} from a non-Object",$names[0])));
		}
	}};
}

///Like `match_object!` but panicking on errors.
#[macro_export]
macro_rules! match_object_panic{
	($cv:expr, $name:literal, $valueid:ident ) => {{
		$crate::match_object_panic!($cv,[$name],$valueid,)
	}};
	($cv:expr, $name:literal, $valueid:ident, $($arm:tt)* ) => {{
		$crate::match_object_panic!($cv,[$name],$valueid,$($arm)*)
	}};
	($cv:expr, $names:expr, $valueid:ident, $($arm:tt)* ) => {{
		if let &$crate::config::ConfigurationValue::Object(ref cv_name, ref cv_pairs) = $cv
		{
			if !$names.iter().any(|&x|x==cv_name)
			{
				if $names.len()==1 {
					panic!("A {} must be created from a `{}` object not `{}`",$names[0],$names[0],cv_name);
				} else {
					panic!("Trying to create either of `{:?}` object from `{}`",$names,cv_name);
				}
			}
			for &(ref name,ref $valueid) in cv_pairs
			{
				match AsRef::<str>::as_ref(&name)
				{
					$( $arm )*
					"legend_name" => (),
					_ => panic!("Nothing to do with field {} in {}",name,$names[0]),
				}
			}
		}
		else
		{
			panic!("Trying to create a {} from a non-Object",$names[0]);
		}
	}};
}

impl ConfigurationValue
{
	///Build an `Object` from its name and a list of `(key,value)`.
	pub fn object(name:&str, pairs:Vec<(&str,ConfigurationValue)>) -> ConfigurationValue
	{
		ConfigurationValue::Object(name.to_string(),pairs.into_iter().map(|(key,value)|(key.to_string(),value)).collect())
	}
	pub fn as_bool(&self) -> Result<bool,Error>
	{
		match self
		{
			&ConfigurationValue::True => Ok(true),
			&ConfigurationValue::False => Ok(false),
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	pub fn as_f64(&self) -> Result<f64,Error>
	{
		match self
		{
			&ConfigurationValue::Number(x) => Ok(x),
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	///Read a non-negative integer. Numbers with a fractional part are rejected.
	fn as_integer(&self) -> Result<u64,Error>
	{
		match self
		{
			&ConfigurationValue::Number(x) =>{
				// Casting from a float to an integer will round the float towards zero
				// overflows and underflows will saturate
				let res = x as u64;
				let y = res as f64;
				let tolerance = 1e-5;
				if x-y > tolerance || x-y < -tolerance {
					Err(error!(ill_formed_configuration, self.clone()))
				} else {
					Ok( res )
				}
			},
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	///Read an integer that fits in an `i32`, possibly negative.
	pub fn as_i32(&self) -> Result<i32,Error>
	{
		match self
		{
			&ConfigurationValue::Number(x) =>{
				let res = x.round();
				let tolerance = 1e-5;
				if x-res > tolerance || x-res < -tolerance || res < i32::MIN as f64 || res > i32::MAX as f64 {
					Err(error!(ill_formed_configuration, self.clone()))
				} else {
					Ok( res as i32 )
				}
			},
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	pub fn as_usize(&self) -> Result<usize,Error>
	{
		Ok(self.as_integer()? as usize)
	}
	pub fn as_time(&self) -> Result<Time,Error>
	{
		self.as_integer()
	}
	pub fn as_array(&self) -> Result<&Vec<ConfigurationValue>,Error>
	{
		match self
		{
			&ConfigurationValue::Array(ref x) => Ok(x),
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	/// Build a generic IllFormedConfiguration error from this ConfigurationValue.
	pub fn ill(&self,message:&str) -> Error
	{
		error!(ill_formed_configuration,self.clone()).with_message(message.to_string())
	}
}
