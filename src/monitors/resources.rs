use crate::config::AlertThresholds;

/// Outcome of comparing a condition with its value on the previous cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Raised,
    Cleared,
}

impl Transition {
    pub fn between(previous: bool, current: bool) -> Transition {
        match (previous, current) {
            (false, true) => Transition::Raised,
            (true, false) => Transition::Cleared,
            _ => Transition::Unchanged,
        }
    }

    pub fn fired(self) -> bool {
        self != Transition::Unchanged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    Cpu,
    Disk,
    NetReceive,
    NetSend,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 4] = [
        AlertCategory::Cpu,
        AlertCategory::Disk,
        AlertCategory::NetReceive,
        AlertCategory::NetSend,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AlertCategory::Cpu => "CPU usage",
            AlertCategory::Disk => "Disk usage",
            AlertCategory::NetReceive => "Network receive",
            AlertCategory::NetSend => "Network send",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            AlertCategory::Cpu | AlertCategory::Disk => "%",
            AlertCategory::NetReceive | AlertCategory::NetSend => " KB/s",
        }
    }
}

/// The values the alert categories are evaluated on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertSample {
    pub cpu_percent: f32,
    pub disk_percent: f32,
    pub net_recv_kb: f64,
    pub net_sent_kb: f64,
}

impl AlertSample {
    pub fn value(&self, category: AlertCategory) -> f64 {
        match category {
            AlertCategory::Cpu => self.cpu_percent as f64,
            AlertCategory::Disk => self.disk_percent as f64,
            AlertCategory::NetReceive => self.net_recv_kb,
            AlertCategory::NetSend => self.net_sent_kb,
        }
    }
}

fn threshold(thresholds: &AlertThresholds, category: AlertCategory) -> f64 {
    match category {
        AlertCategory::Cpu => thresholds.cpu as f64,
        AlertCategory::Disk => thresholds.disk as f64,
        AlertCategory::NetReceive | AlertCategory::NetSend => thresholds.net_kb,
    }
}

/// A category that changed state in the last observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertNotice {
    pub category: AlertCategory,
    pub transition: Transition,
    pub value: f64,
    pub threshold: f64,
}

/// Whether each category is currently alerting.
///
/// Starts all-clear and lives as long as the bot process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    pub cpu: bool,
    pub disk: bool,
    pub net_receive: bool,
    pub net_send: bool,
}

impl AlertState {
    pub fn is_alerting(&self, category: AlertCategory) -> bool {
        match category {
            AlertCategory::Cpu => self.cpu,
            AlertCategory::Disk => self.disk,
            AlertCategory::NetReceive => self.net_receive,
            AlertCategory::NetSend => self.net_send,
        }
    }

    fn flag_mut(&mut self, category: AlertCategory) -> &mut bool {
        match category {
            AlertCategory::Cpu => &mut self.cpu,
            AlertCategory::Disk => &mut self.disk,
            AlertCategory::NetReceive => &mut self.net_receive,
            AlertCategory::NetSend => &mut self.net_send,
        }
    }

    /// Records one sample; returns a notice for every category that transitioned
    pub fn observe(&mut self, sample: &AlertSample, thresholds: &AlertThresholds) -> Vec<AlertNotice> {
        AlertCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let value = sample.value(category);
                let threshold = threshold(thresholds, category);
                let condition = value >= threshold;

                let flag = self.flag_mut(category);
                let transition = Transition::between(*flag, condition);
                *flag = condition;

                transition.fired().then_some(AlertNotice {
                    category,
                    transition,
                    value,
                    threshold,
                })
            })
            .collect()
    }
}
