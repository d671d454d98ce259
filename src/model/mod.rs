//! Types that represent the core data model, such as `Transaction` and `Category`.
mod amount;
mod category;
mod cell;
mod mapping;
mod month;
mod records;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::Category;
pub use cell::{column_letters, Cell};
pub use mapping::{Mapping, MappingError};
pub use month::{month_name, parse_month};
pub use records::{Record, Records};
pub use transaction::{
    date_only, parse_date, Column, Transaction, TransactionKind, DATE_FORMAT, NO_DESCRIPTION,
};
