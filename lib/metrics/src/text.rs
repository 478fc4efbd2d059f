use std::fmt::Write;

use crate::{Observation, Reporter};

/// Renders metrics in the Prometheus text exposition format.
#[derive(Default)]
pub struct TextReporter {
    buf: String,
    current: Option<&'static str>,
}

impl TextReporter {
    pub fn into_string(self) -> String {
        self.buf
    }
}

fn format_le(le: f64) -> String {
    if le.is_infinite() {
        "+Inf".to_string()
    } else {
        le.to_string()
    }
}

impl Reporter for TextReporter {
    fn start_metric(&mut self, name: &'static str, description: &'static str) {
        self.current = Some(name);
        let _ = writeln!(self.buf, "# HELP {name} {description}");
    }

    fn report(&mut self, observation: Observation) {
        let Some(name) = self.current else {
            return;
        };

        match observation {
            Observation::Counter(value) => {
                let _ = writeln!(self.buf, "# TYPE {name} counter");
                let _ = writeln!(self.buf, "{name} {value}");
            }
            Observation::Histogram(snapshot) => {
                let _ = writeln!(self.buf, "# TYPE {name} histogram");

                let mut cumulative = 0;
                for bucket in &snapshot.buckets {
                    cumulative += bucket.count;
                    let _ = writeln!(
                        self.buf,
                        "{name}_bucket{{le=\"{}\"}} {cumulative}",
                        format_le(bucket.le)
                    );
                }

                let _ = writeln!(self.buf, "{name}_sum {}", snapshot.sum);
                let _ = writeln!(self.buf, "{name}_count {cumulative}");
            }
        }
    }

    fn finish_metric(&mut self) {
        self.current = None;
    }
}
