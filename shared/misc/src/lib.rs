pub use arrayvec::*;

pub use derivative::Derivative;
pub use derive_more;
pub use float_cmp::ApproxEq;
pub use itertools::*;
pub use rand::{self, prelude::*};
pub use smallvec::{self, *};
pub use thiserror::{self, Error};

pub use logging::{
    self, prelude::*, slog_kv_debug, slog_kv_display, slog_value_debug, slog_value_display,
};

// misc imports that annoyingly get resolved to other pub exports of std/core
// https://github.com/intellij-rust/intellij-rust/issues/5654
pub use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::Hash,
    iter::{empty, once},
    marker::PhantomData,
};

/// Deterministic rng for tests and benches, random seed if none given
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

#[macro_export]
macro_rules! some_or_continue {
    ($opt:expr) => {
        match $opt {
            Some(v) => v,
            None => continue,
        }
    };
}

#[macro_export]
macro_rules! some_or_return {
    ($opt:expr) => {
        match $opt {
            Some(v) => v,
            None => return,
        }
    };
}
