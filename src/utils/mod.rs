//! Small encoding helpers shared by the class file reader and writer.

pub mod mutf8;
