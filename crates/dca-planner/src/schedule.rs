//! 투자 일정 생성.
//!
//! 빈도와 대상 월로부터 투자 일자를 결정적으로 생성합니다.
//!
//! - daily: 해당 월의 모든 평일
//! - weekly: 매주 지정 요일 (기본 목요일)
//! - biweekly: 월 중 두 기준일 (기본 1일, 15일)
//! - monthly: 월 중 한 기준일 (기본 1일)
//!
//! 기준일이 주말이면 같은 월 안의 다음 평일로 옮깁니다.
//! 월 말까지 평일이 없으면 직전 평일을 사용합니다.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use dca_core::{Frequency, PlanningConfig, TargetMonth};

/// 투자 일정 생성기.
#[derive(Debug, Clone)]
pub struct InvestmentSchedule {
    weekly_weekday: Weekday,
    biweekly_days: [u32; 2],
    monthly_day: u32,
}

impl Default for InvestmentSchedule {
    fn default() -> Self {
        Self::new(&PlanningConfig::default())
    }
}

impl InvestmentSchedule {
    pub fn new(config: &PlanningConfig) -> Self {
        Self {
            weekly_weekday: config.weekly_weekday,
            biweekly_days: config.biweekly_days,
            monthly_day: config.monthly_day,
        }
    }

    /// 투자 일자 목록 (오름차순, 중복 없음).
    pub fn dates(&self, frequency: Frequency, month: TargetMonth) -> Vec<NaiveDate> {
        match frequency {
            Frequency::Daily => month.days().filter(|d| is_weekday(*d)).collect(),
            Frequency::Weekly => month
                .days()
                .filter(|d| d.weekday() == self.weekly_weekday)
                .collect(),
            Frequency::Biweekly => {
                let mut dates: Vec<_> = self
                    .biweekly_days
                    .iter()
                    .filter_map(|day| roll_to_weekday(month, *day))
                    .collect();
                dates.sort();
                dates.dedup();
                dates
            }
            Frequency::Monthly => roll_to_weekday(month, self.monthly_day)
                .into_iter()
                .collect(),
        }
    }
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 기준일을 같은 월 안의 평일로 옮깁니다.
fn roll_to_weekday(month: TargetMonth, day: u32) -> Option<NaiveDate> {
    let anchor = month.day(day)?;

    let forward = std::iter::successors(Some(anchor), |d| d.succ_opt())
        .take_while(|d| d.month() == anchor.month())
        .find(|d| is_weekday(*d));

    forward.or_else(|| {
        std::iter::successors(Some(anchor), |d| d.checked_sub_signed(Duration::days(1)))
            .take_while(|d| d.month() == anchor.month())
            .find(|d| is_weekday(*d))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_is_every_weekday() {
        let schedule = InvestmentSchedule::default();
        // 2024-03: 31일, 주말 10일
        let dates = schedule.dates(Frequency::Daily, TargetMonth::new(2024, 3).unwrap());
        assert_eq!(dates.len(), 21);
        assert!(dates.iter().all(|d| is_weekday(*d)));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_weekly_uses_thursday() {
        let schedule = InvestmentSchedule::default();
        let dates = schedule.dates(Frequency::Weekly, TargetMonth::new(2024, 2).unwrap());
        assert_eq!(
            dates,
            vec![date(2024, 2, 1), date(2024, 2, 8), date(2024, 2, 15), date(2024, 2, 22), date(2024, 2, 29)]
        );
    }

    #[test]
    fn test_biweekly_rolls_weekend_forward() {
        let schedule = InvestmentSchedule::default();
        // 2024-06-01은 토요일, 06-15도 토요일
        let dates = schedule.dates(Frequency::Biweekly, TargetMonth::new(2024, 6).unwrap());
        assert_eq!(dates, vec![date(2024, 6, 3), date(2024, 6, 17)]);
    }

    #[test]
    fn test_monthly_single_date() {
        let schedule = InvestmentSchedule::default();
        let dates = schedule.dates(Frequency::Monthly, TargetMonth::new(2024, 9).unwrap());
        // 2024-09-01은 일요일
        assert_eq!(dates, vec![date(2024, 9, 2)]);
    }

    #[test]
    fn test_roll_back_at_month_end() {
        // 2026-02-28은 토요일, 2월에 그 이후 평일 없음
        let month = TargetMonth::new(2026, 2).unwrap();
        assert_eq!(roll_to_weekday(month, 28), Some(date(2026, 2, 27)));
    }

    #[test]
    fn test_biweekly_dedups_collapsed_days() {
        let config = PlanningConfig {
            biweekly_days: [1, 2],
            ..PlanningConfig::default()
        };
        let schedule = InvestmentSchedule::new(&config);
        // 2024-06-01(토), 06-02(일) 모두 06-03(월)로 이동
        let dates = schedule.dates(Frequency::Biweekly, TargetMonth::new(2024, 6).unwrap());
        assert_eq!(dates, vec![date(2024, 6, 3)]);
    }
}
