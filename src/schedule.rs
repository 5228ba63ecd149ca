//! Virtual-clock timers.
//!
//! The deck never sleeps. The embedding environment advances the clock and
//! the scheduler hands back whatever came due, in order.

/// Work a timer can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Hide the status message.
    ClearMessage,
    /// Compare the environment location against the last seen value.
    PollLocation,
}

#[derive(Debug, Clone)]
struct Timer {
    due: u64,
    seq: u64,
    task: Task,
    /// Re-arm interval for recurring timers.
    every: Option<u64>,
}

/// Ordered set of pending timers against a virtual clock in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    seq: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `task` once, `delay` milliseconds from now.
    pub fn schedule(&mut self, delay: u64, task: Task) {
        self.push(self.now + delay, task, None);
    }

    /// Run `task` every `interval` milliseconds. A zero interval is ignored.
    pub fn schedule_every(&mut self, interval: u64, task: Task) {
        if interval == 0 {
            return;
        }
        self.push(self.now + interval, task, Some(interval));
    }

    fn push(&mut self, due: u64, task: Task, every: Option<u64>) {
        self.timers.push(Timer {
            due,
            seq: self.seq,
            task,
            every,
        });
        self.seq += 1;
    }

    /// Number of pending timers for `task`.
    pub fn pending(&self, task: Task) -> usize {
        self.timers.iter().filter(|t| t.task == task).count()
    }

    /// Advance the clock by `dt` and return every task that came due, in
    /// due order (ties in scheduling order).
    pub fn advance(&mut self, dt: u64) -> Vec<Task> {
        let target = self.now + dt;
        let mut fired = Vec::new();

        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= target)
                .min_by_key(|(_, t)| (t.due, t.seq))
                .map(|(i, _)| i);
            let Some(index) = next else {
                break;
            };
            let timer = self.timers.swap_remove(index);
            self.now = timer.due;
            fired.push(timer.task);
            if let Some(every) = timer.every {
                self.push(timer.due + every, timer.task, Some(every));
            }
        }

        self.now = target;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1000, Task::ClearMessage);
        assert!(scheduler.advance(999).is_empty());
        assert_eq!(scheduler.advance(1), vec![Task::ClearMessage]);
        assert!(scheduler.advance(5000).is_empty());
    }

    #[test]
    fn test_recurring_poll() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(200, Task::PollLocation);
        assert_eq!(scheduler.advance(650).len(), 3);
        assert_eq!(scheduler.pending(Task::PollLocation), 1);
        assert_eq!(scheduler.advance(150), vec![Task::PollLocation]);
    }

    #[test]
    fn test_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(300, Task::ClearMessage);
        scheduler.schedule_every(200, Task::PollLocation);
        assert_eq!(
            scheduler.advance(400),
            vec![Task::PollLocation, Task::ClearMessage, Task::PollLocation]
        );
    }
}
