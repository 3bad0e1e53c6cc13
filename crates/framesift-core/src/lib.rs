pub mod compute;
pub mod consts;
pub mod decision;
pub mod error;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod region;
pub mod similarity;
