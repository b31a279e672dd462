use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: f64,
    pub duration: u32,
    pub daily_roi: String,
    #[serde(default)]
    pub loops: u32,
    #[serde(default)]
    pub vip_needed: String,
    #[serde(default)]
    pub status: bool,
}

impl Plan {
    /// `daily_roi` travels as a decimal string; unparsable values read as zero.
    pub fn daily_roi_reais(&self) -> f64 {
        self.daily_roi.trim().parse().unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Investment {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub plan_id: i64,
    pub price: f64,
    pub buy_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub plan: Plan,
}

impl Investment {
    /// Whole days left until `end_date`, rounded up. Negative once expired.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.end_date - now).num_milliseconds();
        let day = 24 * 60 * 60 * 1000;

        millis.div_euclid(day) + i64::from(millis.rem_euclid(day) != 0)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyPlan {
    pub user_id: String,
    pub plan_id: i64,
}
