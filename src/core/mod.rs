// Core modules implementing the value tree, conversion engine, and error modeling.
pub mod copy;
pub mod dispatch;
pub mod error;
pub mod list;
pub mod node;
pub mod optimize;
pub mod registry;
pub mod shape;
pub mod target;
pub mod temporal;
pub mod value;
