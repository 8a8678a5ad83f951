//! Core library for the novel-tracker command line application.
//!
//! A recording run counts the characters of every manuscript document and
//! writes the total into a tracking workbook, either as one row per day or one
//! row per invocation. External services sit behind the traits in
//! [`novel::tracker::store`]; concrete adapters live under
//! [`novel::tracker::io`], the counting logic in
//! [`novel::tracker::aggregate`], the row bookkeeping in
//! [`novel::tracker::reconcile`], and the scheduler-facing entry points in
//! [`novel::tracker::jobs`].

pub mod novel;

pub use novel::tracker::{
    Result, TrackerError, aggregate, config, error, io, jobs, model, reconcile, store,
};
