use invoice_builder_core::Aggregate;

/// Execute an aggregate command deterministically (no IO).
///
/// 1. **Decide**: calls `aggregate.handle(command)` to get events (pure, no mutation)
/// 2. **Evolve**: applies each event via `aggregate.apply(event)`
///
/// The aggregate is mutated in place and the applied events are returned so the
/// caller can decide whether anything needs persisting. On error nothing is
/// applied.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoice_builder_core::{AggregateRoot, DomainError};

    /// A counter that refuses to go past a limit.
    #[derive(Debug)]
    struct Counter {
        value: u32,
        limit: u32,
        version: u64,
    }

    #[derive(Debug, Clone)]
    struct Bump(u32);

    #[derive(Debug, Clone, PartialEq)]
    struct Bumped;

    impl AggregateRoot for Counter {
        type Id = u8;

        fn id(&self) -> &u8 {
            &0
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    impl Aggregate for Counter {
        type Command = Bump;
        type Event = Bumped;
        type Error = DomainError;

        fn apply(&mut self, _: &Bumped) {
            self.value += 1;
            self.version += 1;
        }

        fn handle(&self, Bump(n): &Bump) -> Result<Vec<Bumped>, DomainError> {
            if self.value + n > self.limit {
                return Err(DomainError::invariant("over the limit"));
            }
            Ok(vec![Bumped; *n as usize])
        }
    }

    fn counter() -> Counter {
        Counter {
            value: 0,
            limit: 3,
            version: 0,
        }
    }

    #[test]
    fn applies_every_emitted_event() {
        let mut c = counter();
        let events = execute(&mut c, &Bump(2)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(c.value, 2);
        assert_eq!(c.version(), 2);
    }

    #[test]
    fn rejected_command_leaves_state_alone() {
        let mut c = counter();
        execute(&mut c, &Bump(2)).unwrap();
        assert!(execute(&mut c, &Bump(2)).is_err());
        assert_eq!(c.value, 2);
        assert_eq!(c.version(), 2);
    }

    #[test]
    fn empty_event_list_is_a_no_op() {
        let mut c = counter();
        assert!(execute(&mut c, &Bump(0)).unwrap().is_empty());
        assert_eq!(c.version(), 0);
    }
}
