pub mod extract;
pub mod lexer;
pub mod params;
pub mod token;
pub mod token_dumper;
