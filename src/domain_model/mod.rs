mod subject;
mod token;

pub use subject::*;
pub use token::*;
