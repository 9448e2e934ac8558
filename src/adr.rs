//! Adenoma detection rate (ADR) statistics.
//!
//! A colonoscopy is "polyp positive" if any of the three tracked adenoma types was found. Rates
//! are reported for all ages, and split by whether the patient was under 50 on the day of the
//! procedure. Episodes without a birth date can't be split, so they are left out of the
//! statistics entirely, but they still count towards the date range of the report.
use crate::{
    dates::{is_under_50, DateRange},
    phisc::Episode,
    ArcStr,
};
use std::collections::BTreeMap;

/// `positive` as a whole-number percentage of `total`.
///
/// Halves round to even. When there is nothing to divide by the result is `-1`.
pub fn rate(positive: u32, total: u32) -> i64 {
    if total == 0 {
        return -1;
    }
    (f64::from(positive) / f64::from(total) * 100.).round_ties_even() as i64
}

/// Counts for one group of colonoscopies.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    pub colonoscopies: u32,
    /// Colonoscopies where at least one adenoma was found.
    pub polyps: u32,
    /// Colonoscopies where a serrated adenoma was found.
    pub serrated: u32,
}

impl Counts {
    fn add(&mut self, episode: &Episode) {
        self.colonoscopies += 1;
        if episode.pathology.has_polyp() {
            self.polyps += 1;
        }
    }

    fn add_with_serrated(&mut self, episode: &Episode) {
        self.add(episode);
        if episode.pathology.serrated {
            self.serrated += 1;
        }
    }

    pub fn adr(&self) -> i64 {
        rate(self.polyps, self.colonoscopies)
    }

    pub fn ssa_rate(&self) -> i64 {
        rate(self.serrated, self.colonoscopies)
    }
}

/// A doctor's counts, split by age.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DoctorCounts {
    pub all: Counts,
    /// Serrated adenomas aren't reported for under 50s.
    pub under_50: Counts,
    pub over_50: Counts,
}

/// The finished rates for one doctor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorRates {
    pub doctor: ArcStr,
    pub colonoscopies: u32,
    pub adr: i64,
    pub adr_under_50: i64,
    pub adr_over_50: i64,
    /// Serrated adenoma rate, all ages.
    pub ssa: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdrStats {
    // B Tree so doctors come out in alphabetical order.
    doctors: BTreeMap<ArcStr, DoctorCounts>,
    /// Over 50s across the whole unit.
    unit_over_50: Counts,
    date_range: DateRange,
}

impl AdrStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_episodes<'a>(episodes: impl IntoIterator<Item = &'a Episode>) -> Self {
        let mut this = Self::new();
        for episode in episodes {
            this.add(episode);
        }
        this
    }

    pub fn add(&mut self, episode: &Episode) {
        self.date_range.update(episode.date);
        let Some(dob) = episode.dob else {
            return;
        };

        let counts = self.doctors.entry(episode.doctor.clone()).or_default();
        counts.all.add_with_serrated(episode);
        if is_under_50(episode.date, dob) {
            counts.under_50.add(episode);
        } else {
            counts.over_50.add_with_serrated(episode);
            self.unit_over_50.add_with_serrated(episode);
        }
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn doctor(&self, name: &str) -> Option<&DoctorCounts> {
        self.doctors.get(name)
    }

    pub fn unit_over_50(&self) -> Counts {
        self.unit_over_50
    }

    /// ADR for over 50s across the unit.
    pub fn unit_adr(&self) -> i64 {
        self.unit_over_50.adr()
    }

    /// Serrated adenoma rate for over 50s across the unit.
    pub fn unit_ssa(&self) -> i64 {
        self.unit_over_50.ssa_rate()
    }

    /// Per-doctor rates, sorted by doctor name.
    pub fn doctor_rates(&self) -> impl Iterator<Item = DoctorRates> + '_ {
        self.doctors.iter().map(|(doctor, counts)| DoctorRates {
            doctor: doctor.clone(),
            colonoscopies: counts.all.colonoscopies,
            adr: counts.all.adr(),
            adr_under_50: counts.under_50.adr(),
            adr_over_50: counts.over_50.adr(),
            ssa: counts.all.ssa_rate(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

impl<'a> FromIterator<&'a Episode> for AdrStats {
    fn from_iter<T: IntoIterator<Item = &'a Episode>>(iter: T) -> Self {
        Self::from_episodes(iter)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::phisc::{Pathology, Procedure};
    use chrono::NaiveDate;

    pub(crate) fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn episode(doctor: &str, dob: Option<NaiveDate>, pathology: Pathology) -> Episode {
        Episode {
            date: ymd(2024, 6, 15),
            surname: "brown".into(),
            mrn: "1".into(),
            dob,
            doctor: doctor.into(),
            procedure: Procedure::Polypectomy,
            pathology,
            malignancy: vec![],
        }
    }

    pub(crate) const NONE: Pathology = Pathology {
        tubular: false,
        serrated: false,
        tubulovillous: false,
    };
    pub(crate) const TA: Pathology = Pathology {
        tubular: true,
        serrated: false,
        tubulovillous: false,
    };
    pub(crate) const SA: Pathology = Pathology {
        tubular: false,
        serrated: true,
        tubulovillous: false,
    };

    #[test]
    fn rates() {
        assert_eq!(rate(3, 10), 30);
        assert_eq!(rate(0, 10), 0);
        assert_eq!(rate(10, 10), 100);
        assert_eq!(rate(2, 3), 67);
        assert_eq!(rate(0, 0), -1);
        assert_eq!(rate(5, 0), -1);
        // ties go to even
        assert_eq!(rate(1, 8), 12);
        assert_eq!(rate(3, 8), 38);
        // recomputing gives the same answer
        assert_eq!(rate(7, 9), rate(7, 9));
    }

    #[test]
    fn smith_has_adr_30() {
        let over_50 = Some(ymd(1950, 1, 1));
        let episodes: Vec<_> = (0..10)
            .map(|i| episode("smith", over_50, if i < 3 { TA } else { NONE }))
            .collect();
        let stats = AdrStats::from_episodes(&episodes);
        let rates: Vec<_> = stats.doctor_rates().collect();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].colonoscopies, 10);
        assert_eq!(rates[0].adr, 30);
        assert_eq!(rates[0].adr_over_50, 30);
        assert_eq!(rates[0].adr_under_50, -1);
        assert_eq!(rates[0].ssa, 0);
        assert_eq!(stats.unit_adr(), 30);
    }

    #[test]
    fn missing_birth_date_only_widens_dates() {
        let mut early = episode("smith", None, TA);
        early.date = ymd(2024, 1, 2);
        let episodes = vec![early, episode("jones", Some(ymd(1990, 1, 1)), SA)];
        let stats: AdrStats = episodes.iter().collect();

        assert!(stats.doctor("smith").is_none());
        assert_eq!(stats.date_range().start(), Some(ymd(2024, 1, 2)));
        assert_eq!(stats.date_range().end(), Some(ymd(2024, 6, 15)));

        let jones = stats.doctor("jones").unwrap();
        assert_eq!(jones.all.colonoscopies, 1);
        assert_eq!(jones.under_50.colonoscopies, 1);
        assert_eq!(jones.under_50.polyps, 1);
        assert_eq!(jones.under_50.serrated, 0);
        assert_eq!(jones.all.serrated, 1);
        // nothing over 50
        assert_eq!(stats.unit_adr(), -1);
        assert_eq!(stats.unit_ssa(), -1);
    }

    #[test]
    fn age_split() {
        let episodes = vec![
            // 50th birthday on the day of the procedure
            episode("smith", Some(ymd(1974, 6, 15)), SA),
            // 50 tomorrow
            episode("smith", Some(ymd(1974, 6, 16)), NONE),
        ];
        let stats = AdrStats::from_episodes(&episodes);
        let smith = stats.doctor("smith").unwrap();
        assert_eq!(smith.over_50.colonoscopies, 1);
        assert_eq!(smith.under_50.colonoscopies, 1);

        let rates = stats.doctor_rates().next().unwrap();
        assert_eq!(rates.adr, 50);
        assert_eq!(rates.adr_over_50, 100);
        assert_eq!(rates.adr_under_50, 0);
        assert_eq!(rates.ssa, 50);
        assert_eq!(stats.unit_ssa(), 100);
    }

    #[test]
    fn doctors_sorted() {
        let dob = Some(ymd(1950, 1, 1));
        let episodes = vec![
            episode("zhou", dob, NONE),
            episode("adams", dob, NONE),
            episode("lee", dob, NONE),
        ];
        let names: Vec<_> = AdrStats::from_episodes(&episodes)
            .doctor_rates()
            .map(|r| r.doctor.to_string())
            .collect();
        assert_eq!(names, ["adams", "lee", "zhou"]);
    }
}
