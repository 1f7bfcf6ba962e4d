pub mod correlation;
pub mod returns;

pub use correlation::{correlation_matrix, pearson, CorrelationMatrix, MatrixError};
pub use returns::{pct_change, DateRange, ReturnTable};
