use serde::{Deserialize, Serialize};

/// Final value of one `group_agg` group, decoded from the accumulator blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub group_id: i64,
    pub sum: i64,
}

//Current observed value of an output, one row per (device, output)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuredState {
    pub device_id: String,
    pub output_id: i64,
    pub timestamp: i64,
    pub state: bool,
    pub level: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setpoint {
    pub device_id: String,
    pub output_id: i64,
    pub timestamp: i64,
    pub state: bool,
    pub level: Option<i64>,
}
