use serde::Serialize;

use super::users::{User, VipTier};

#[derive(Clone, Debug, Serialize)]
pub struct Referral {
    pub referral_code: String,
    pub link: String,
    pub count: u64,
    pub bonus: f64,
    pub investments: f64,
    pub deposits: f64,
    pub vip_type: VipTier,
}

impl Referral {
    pub fn from_user(user: &User, link_base: &str) -> Self {
        Referral {
            referral_code: user.referal_code.clone(),
            link: format!(
                "{}/auth/register?r={}",
                link_base.trim_end_matches('/'),
                user.referal_code
            ),
            count: user.referal_count,
            bonus: user.referal_bonus,
            investments: user.referal_investments,
            deposits: user.referal_deposits,
            vip_type: user.vip_type,
        }
    }
}
