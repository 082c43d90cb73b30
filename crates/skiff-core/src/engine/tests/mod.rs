use super::*;
use crate::clock::ManualClock;
use crate::message::MetadataValue;

mod common;
use common::*;

mod dlq;
mod reserve;
