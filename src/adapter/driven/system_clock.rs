use crate::domain::port::Clock;
use chrono::{NaiveDate, Utc};

/// システム時計
/// 日付はUTCで判定する
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}
