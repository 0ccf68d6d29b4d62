//! services/shutdown.rs
//! Señal de apagado compartida por el worker y los envíos en segundo plano.

use std::time::Duration;

use tokio::sync::watch;

/// Lado que dispara el apagado.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

/// Lado que observa el apagado; se puede clonar libremente.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Dispara el apagado. Llamarlo más de una vez no tiene efecto.
    pub fn shutdown(&self) {
        let fired = self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        });
        if fired {
            log::info!("(shutdown) Señal de apagado enviada");
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownListener {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Se resuelve cuando se dispara el apagado. Si la señal se descarta sin
    /// dispararse, nunca se resuelve.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Duerme `duration`; devuelve `false` si el apagado la interrumpe.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
