use chrono::{Local, NaiveDate, NaiveTime};

/// Time source for date-dependent workflows.
///
/// The engine resolves "today" through this trait so tests can pin the
/// weekday and the check-in timestamps.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn time_of_day(&self) -> NaiveTime;
}

/// Wall-clock time in the server's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}
