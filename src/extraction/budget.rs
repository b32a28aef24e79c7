//! Orçamentos de tempo cooperativos e sinal de cancelamento.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Relógio com limite. Não interrompe nada sozinho: quem varre consulta
/// [`TimeBudget::exhausted`] entre unidades de trabalho e encerra com o
/// que já coletou.
#[derive(Clone, Copy, Debug)]
pub struct TimeBudget {
    started: Instant,
    limit: Duration,
}

impl TimeBudget {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Orçamento zero se esgota imediatamente.
    pub fn exhausted(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Tempo que ainda resta; zero depois de esgotado.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }
}

/// Sinal de cancelamento compartilhado (consultivo).
///
/// Verificado entre arquivos e entre lotes; quando levantado, o pipeline
/// retorna cedo sem efeitos colaterais em protocolos.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
