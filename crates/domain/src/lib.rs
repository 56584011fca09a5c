pub mod carrier;
pub mod country;
pub mod errors;
pub mod instruction;
pub mod matching;
pub mod records;

pub use carrier::*;
pub use errors::*;
pub use instruction::*;
pub use matching::*;
pub use records::*;
