//! KNX Link 共享领域模型：组地址、数据点类型标识与数据点值。

pub mod address;
pub mod datapoint;

pub use address::{AddressError, GroupAddress};
pub use datapoint::{DatapointId, DatapointIdError, DatapointValue, RenderedValue};
