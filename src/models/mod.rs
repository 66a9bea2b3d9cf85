pub mod enums;
pub mod timestamp;
pub mod patient;
pub mod vital_sign;
pub mod lab;
pub mod imaging;
pub mod history;
pub mod conversation;

pub use enums::*;
pub use timestamp::*;
pub use patient::*;
pub use vital_sign::*;
pub use lab::*;
pub use imaging::*;
pub use history::*;
pub use conversation::*;
