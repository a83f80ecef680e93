use crate::{errors::AnalysisError, models::*, Result};

/// Picks the applicable reference range among a parameter's candidates for a
/// given patient.
pub struct RangeResolver;

impl RangeResolver {
    /// Filters candidates by demographic applicability and prefers the most
    /// specific match: three matching filters outrank two, two outrank one,
    /// one outranks the fully general candidate. Equally specific candidates
    /// are tie-broken by catalog insertion order (first wins); specificity
    /// alone does not fully order candidates with disjoint filter sets, so
    /// the tie-break is an explicit policy, not an accident of iteration.
    pub fn resolve<'a>(
        parameter: &'a Parameter,
        profile: &PatientProfile,
    ) -> Result<&'a ReferenceRange> {
        let mut best: Option<(&ReferenceRange, u8)> = None;

        for candidate in &parameter.candidate_ranges {
            let Some(score) = Self::match_score(candidate, profile) else {
                continue;
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }

        best.map(|(range, _)| range)
            .ok_or_else(|| AnalysisError::NoReferenceRange(parameter.name.clone()))
    }

    /// `None` when the candidate does not apply to this patient; otherwise the
    /// number of set-and-matching filters (0 for the fully general candidate).
    fn match_score(range: &ReferenceRange, profile: &PatientProfile) -> Option<u8> {
        let mut score = 0;

        match range.age_category {
            None => {}
            Some(category) if category == profile.age_category() => score += 1,
            Some(_) => return None,
        }

        match range.sex {
            None => {}
            Some(sex) if sex == profile.sex => score += 1,
            Some(_) => return None,
        }

        // A stage filter only matches a patient who actually has CKD.
        match range.ckd_stage {
            None => {}
            Some(stage) if profile.ckd_present && stage == profile.ckd_stage => score += 1,
            Some(_) => return None,
        }

        Some(score)
    }
}
