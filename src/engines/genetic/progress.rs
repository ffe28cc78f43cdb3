use super::genome::Individual;

/// Observer of a genetic run. Generation 0 is the initial population.
pub trait ProgressCallback {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, best: &Individual);
    fn on_individual_evaluated(&mut self, index: usize, total: usize);
}

/// Reports progress through the `log` facade.
pub struct LogProgressCallback {
    name: String,
}

impl LogProgressCallback {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("{}: generation {} starting", self.name, generation);
    }

    fn on_generation_complete(&mut self, generation: usize, best: &Individual) {
        log::info!(
            "{}: generation {} complete, best score {:.6} (feasible: {})",
            self.name,
            generation,
            best.score,
            best.is_feasible()
        );
    }

    fn on_individual_evaluated(&mut self, index: usize, total: usize) {
        if index % 10 == 0 || index == total {
            log::trace!("{}: evaluated {}/{} individuals", self.name, index, total);
        }
    }
}

/// Forwards progress over a channel, for callers watching a run from
/// another thread.
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete { generation: usize, best_score: f64, feasible: bool },
    IndividualEvaluated { current: usize, total: usize },
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, generation: usize, best: &Individual) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            best_score: best.score,
            feasible: best.is_feasible(),
        });
    }

    fn on_individual_evaluated(&mut self, index: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::IndividualEvaluated { current: index, total });
    }
}
