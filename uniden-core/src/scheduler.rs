//! Conditional callbacks
//!
//! A registration pairs a condition on the session state with a one-shot
//! action. It is Armed until either
//! - an [`evaluate`](CallbackScheduler::evaluate) pass finds the condition
//!   true, runs the action and removes it (Fired), or
//! - its timeout elapses and the owner calls
//!   [`expire`](CallbackScheduler::expire) (Discarded).
//!
//! Whichever happens first removes the entry; the other path then finds
//! nothing and does nothing. The scheduler keeps no clock: the owner runs one
//! timer per registration and reports expiry by id.

use std::fmt;

type Condition<C> = Box<dyn Fn(&C) -> bool + Send>;
type Action<C, E> = Box<dyn FnOnce(&mut C) -> Result<(), E> + Send>;

/// Handle of one registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Registration<C, E> {
    id: CallbackId,
    condition: Condition<C>,
    action: Action<C, E>,
}

/// Outcome of one fired registration
#[derive(Debug)]
pub struct Fired<E> {
    pub id: CallbackId,
    pub result: Result<(), E>,
}

/// Armed registrations against a context `C`, in registration order
pub struct CallbackScheduler<C, E> {
    next_id: u64,
    armed: Vec<Registration<C, E>>,
}

impl<C, E> Default for CallbackScheduler<C, E> {
    fn default() -> Self {
        CallbackScheduler {
            next_id: 1,
            armed: Vec::new(),
        }
    }
}

impl<C, E> fmt::Debug for CallbackScheduler<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackScheduler")
            .field(
                "armed",
                &self.armed.iter().map(|r| r.id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<C, E> CallbackScheduler<C, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new registration; the caller starts its timer
    pub fn register<F, A>(&mut self, condition: F, action: A) -> CallbackId
    where
        F: Fn(&C) -> bool + Send + 'static,
        A: FnOnce(&mut C) -> Result<(), E> + Send + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.armed.push(Registration {
            id,
            condition: Box::new(condition),
            action: Box::new(action),
        });
        id
    }

    /// Run every armed registration whose condition holds against `ctx`.
    ///
    /// Conditions are checked in registration order, each against the state
    /// left by the actions fired before it.
    pub fn evaluate(&mut self, ctx: &mut C) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        let mut still_armed = Vec::with_capacity(self.armed.len());

        for registration in self.armed.drain(..) {
            if (registration.condition)(&*ctx) {
                let result = (registration.action)(ctx);
                fired.push(Fired {
                    id: registration.id,
                    result,
                });
            } else {
                still_armed.push(registration);
            }
        }

        self.armed = still_armed;
        fired
    }

    /// Discard a registration whose timeout elapsed.
    ///
    /// Returns false when it already fired or expired.
    pub fn expire(&mut self, id: CallbackId) -> bool {
        match self.armed.iter().position(|r| r.id == id) {
            Some(i) => {
                self.armed.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, id: CallbackId) -> bool {
        self.armed.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_when_condition_holds() {
        let mut scheduler: CallbackScheduler<i32, ()> = CallbackScheduler::new();
        let id = scheduler.register(|n| *n > 2, |n| {
            *n += 100;
            Ok(())
        });

        let mut ctx = 1;
        assert!(scheduler.evaluate(&mut ctx).is_empty());
        assert_eq!(ctx, 1);

        ctx = 3;
        let fired = scheduler.evaluate(&mut ctx);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, id);
        assert_eq!(ctx, 103);

        assert!(scheduler.evaluate(&mut ctx).is_empty());
        assert_eq!(ctx, 103);
        assert!(!scheduler.is_armed(id));
    }

    #[test]
    fn test_expired_registration_never_fires() {
        let mut scheduler: CallbackScheduler<i32, ()> = CallbackScheduler::new();
        let id = scheduler.register(|n| *n == 7, |n| {
            *n = 0;
            Ok(())
        });

        assert!(scheduler.expire(id));
        assert!(!scheduler.expire(id));

        let mut ctx = 7;
        assert!(scheduler.evaluate(&mut ctx).is_empty());
        assert_eq!(ctx, 7);
    }

    #[test]
    fn test_expire_after_fire_is_noop() {
        let mut scheduler: CallbackScheduler<i32, ()> = CallbackScheduler::new();
        let id = scheduler.register(|_| true, |_| Ok(()));
        assert_eq!(scheduler.evaluate(&mut 0).len(), 1);
        assert!(!scheduler.expire(id));
    }

    #[test]
    fn test_registration_order_and_errors() {
        let mut scheduler: CallbackScheduler<Vec<&'static str>, String> = CallbackScheduler::new();
        let first = scheduler.register(|_| true, |log| {
            log.push("first");
            Ok(())
        });
        let blocked = scheduler.register(|log| log.len() > 5, |_| Ok(()));
        let second = scheduler.register(|log| log.contains(&"first"), |log| {
            log.push("second");
            Err("nope".to_string())
        });

        let mut log = Vec::new();
        let fired = scheduler.evaluate(&mut log);
        assert_eq!(log, vec!["first", "second"]);
        assert_eq!(
            fired.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![first, second]
        );
        assert_eq!(fired[1].result, Err("nope".to_string()));
        assert!(scheduler.is_armed(blocked));
        assert_eq!(scheduler.len(), 1);
    }
}
