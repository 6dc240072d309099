use dashmap::DashSet;

/// Tracks which subjects have a training run in progress.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    active: DashSet<String>,
}

impl InFlight {
    /// `None` if a run for `subject` is already active.
    pub(crate) fn try_begin(&self, subject: &str) -> Option<InFlightGuard<'_>> {
        if self.active.insert(subject.to_string()) {
            Some(InFlightGuard {
                owner: self,
                subject: subject.to_string(),
            })
        } else {
            None
        }
    }
}

pub(crate) struct InFlightGuard<'a> {
    owner: &'a InFlight,
    subject: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.active.remove(&self.subject);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_for_same_subject_is_refused_until_drop() {
        let in_flight = InFlight::default();
        let guard = in_flight.try_begin("zombie");
        assert!(guard.is_some());
        assert!(in_flight.try_begin("zombie").is_none());
        assert!(in_flight.try_begin("spider").is_some());
        drop(guard);
        assert!(in_flight.try_begin("zombie").is_some());
    }
}
