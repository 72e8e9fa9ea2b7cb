// Application layer: LP reading, solve orchestration and result reporting

pub mod facade;
pub mod lp_reader;
pub mod report;

pub use facade::SolveFacade;
pub use lp_reader::read_lp;
pub use report::{Column, Columns, Row, Solution};
