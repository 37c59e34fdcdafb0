use rusqlite::functions::{Aggregate, Context};
use tracing::error;

use crate::error::{Error, Result};
use crate::functions::{GROUP_AGG, GROUP_AGG_ARITY};

pub const ACCUMULATOR_SENTINEL: u32 = 8091;
pub const ACCUMULATOR_BASELINE: i64 = 80;

/// guard (u32 LE) followed by sum (i64 LE)
pub const ACCUMULATOR_LEN: usize = 12;

/// Per-group state of `group_agg`. SQLite keeps one per group and hands it to every step;
/// a group that never stepped has none at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accumulator {
    guard: u32,
    sum: i64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            guard: ACCUMULATOR_SENTINEL,
            sum: ACCUMULATOR_BASELINE,
        }
    }
}

impl Accumulator {
    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn guard(&self) -> u32 {
        self.guard
    }

    pub fn check_guard(&self) -> Result<()> {
        if self.guard != ACCUMULATOR_SENTINEL {
            error!("aggregate accumulator guard is {}, memory corrupt?", self.guard);
            return Err(Error::GuardViolation { found: self.guard });
        }
        Ok(())
    }

    pub fn add(&mut self, group_id: i64) -> Result<()> {
        self.check_guard()?;

        let Some(sum) = self.sum.checked_add(group_id) else {
            error!("aggregate sum {} overflows adding {}", self.sum, group_id);
            return Err(Error::SumOverflow {
                sum: self.sum,
                addend: group_id,
            });
        };
        self.sum = sum;
        Ok(())
    }

    pub fn encode(&self) -> [u8; ACCUMULATOR_LEN] {
        let mut bytes = [0; ACCUMULATOR_LEN];
        bytes[..4].copy_from_slice(&self.guard.to_le_bytes());
        bytes[4..].copy_from_slice(&self.sum.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; ACCUMULATOR_LEN] = bytes.try_into().map_err(|_| {
            error!(
                "aggregate blob is {} bytes, expected {}",
                bytes.len(),
                ACCUMULATOR_LEN
            );
            Error::Decode {
                expected: ACCUMULATOR_LEN,
                found: bytes.len(),
            }
        })?;

        let mut guard = [0; 4];
        guard.copy_from_slice(&bytes[..4]);
        let mut sum = [0; 8];
        sum.copy_from_slice(&bytes[4..]);

        let accumulator = Accumulator {
            guard: u32::from_le_bytes(guard),
            sum: i64::from_le_bytes(sum),
        };
        accumulator.check_guard()?;

        Ok(accumulator)
    }
}

pub fn check_arity(found: usize) -> Result<()> {
    if found != GROUP_AGG_ARITY {
        error!(
            "{} takes {} arguments, but given {}",
            GROUP_AGG, GROUP_AGG_ARITY, found
        );
        return Err(Error::Arity {
            function: GROUP_AGG,
            expected: GROUP_AGG_ARITY,
            found,
        });
    }
    Ok(())
}

fn user_error(err: Error) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(Box::new(err))
}

/// `group_agg(deviceid, outputid, groupid)`: 80 plus the sum of the group's groupid values,
/// returned as the encoded [`Accumulator`].
pub struct GroupAggregate;

impl Aggregate<Accumulator, Option<Vec<u8>>> for GroupAggregate {
    fn init(&self, _ctx: &mut Context<'_>) -> rusqlite::Result<Accumulator> {
        Ok(Accumulator::default())
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut Accumulator) -> rusqlite::Result<()> {
        check_arity(ctx.len()).map_err(user_error)?;

        let group_id: i64 = ctx.get(2)?;
        acc.add(group_id).map_err(user_error)
    }

    fn finalize(
        &self,
        _ctx: &mut Context<'_>,
        acc: Option<Accumulator>,
    ) -> rusqlite::Result<Option<Vec<u8>>> {
        Ok(acc.map(|acc| acc.encode().to_vec()))
    }
}
