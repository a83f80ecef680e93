use chrono::{DateTime, Utc};
use rand::Rng;

/// Injected time source. Model constructors never read wall-clock time directly,
/// so analyses can be reproduced exactly in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Test double.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Injected analysis-id source, same rationale as [`Clock`].
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random hex suffix with an `AN-` prefix.
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        let suffix: u64 = rand::thread_rng().gen();
        format!("AN-{suffix:016x}")
    }
}

pub struct FixedIdGenerator(pub String);

impl IdGenerator for FixedIdGenerator {
    fn next_id(&self) -> String {
        self.0.clone()
    }
}
