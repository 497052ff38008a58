pub mod cli;
pub mod ctx;
pub mod decode;
pub mod glm;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod schema;
pub mod scores;
pub mod volume;
