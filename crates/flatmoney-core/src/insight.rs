//! The advisory insight collaborator.
//!
//! An insight only ever sees a value snapshot of one month's summary, formatted
//! for display. Whatever happens on the service side, callers get a string back.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;

use flatmoney_domain::MonthRecord;

use crate::{format::CurrencyFormatter, summary_service::MonthSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MonthOutcome {
    Profit,
    BreakEven,
    Loss,
}

/// Display snapshot handed to an [`InsightService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub month_label: String,
    pub year: String,
    pub total_revenue: String,
    pub total_expenses: String,
    pub admin_fee_percent: String,
    pub admin_fee_amount: String,
    pub net_profit: String,
    pub per_partner_amount: String,
    pub partners_count: String,
    pub outcome: MonthOutcome,
    /// Net profit as a whole percentage of revenue; `None` without revenue.
    pub margin_percent: Option<i64>,
}

impl InsightRequest {
    pub fn from_record(
        record: &MonthRecord,
        summary: &MonthSummary,
        formatter: &dyn CurrencyFormatter,
    ) -> Self {
        let net = summary.net_profit.cents();
        let outcome = match net {
            n if n > 0 => MonthOutcome::Profit,
            0 => MonthOutcome::BreakEven,
            _ => MonthOutcome::Loss,
        };
        let revenue = summary.total_revenue.cents();
        let margin_percent =
            (revenue > 0).then(|| (i128::from(net) * 100 / i128::from(revenue)) as i64);
        Self {
            month_label: record.month().label().to_string(),
            year: record.year().to_string(),
            total_revenue: formatter.format_amount(summary.total_revenue),
            total_expenses: formatter.format_amount(summary.total_expenses),
            admin_fee_percent: format!("{}%", record.admin_fee_percent()),
            admin_fee_amount: formatter.format_amount(summary.admin_fee_amount),
            net_profit: formatter.format_amount(summary.net_profit),
            per_partner_amount: formatter.format_share(summary.per_partner_amount),
            partners_count: record.partners_count().to_string(),
            outcome,
            margin_percent,
        }
    }

    /// Prompt text for a text-generation backend.
    pub fn prompt(&self) -> String {
        format!(
            "Analise os seguintes dados financeiros de um flat de aluguel por temporada \
             para o mês de {month}/{year}:\n\
             - Faturamento Bruto: {revenue}\n\
             - Despesas Totais: {expenses}\n\
             - Taxa de Administração ({fee_percent} sobre o Bruto): {fee}\n\
             - Lucro Líquido Final (para distribuição): {net}\n\
             - Sócios: {partners} ({share} por sócio)\n\n\
             Forneça um resumo amigável e direto em português (máximo 3 parágrafos) \
             dizendo se o mês foi bom, com um conselho simples para melhorar.",
            month = self.month_label,
            year = self.year,
            revenue = self.total_revenue,
            expenses = self.total_expenses,
            fee_percent = self.admin_fee_percent,
            fee = self.admin_fee_amount,
            net = self.net_profit,
            partners = self.partners_count,
            share = self.per_partner_amount,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsightError {
    #[error("insight credential is not configured")]
    MissingCredential,
    #[error("insight service failed: {0}")]
    Service(String),
    #[error("insight service returned an empty response")]
    EmptyResponse,
    #[error("insight request was cancelled")]
    Cancelled,
}

impl InsightError {
    /// Informational text shown to the user in place of an insight.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            InsightError::MissingCredential => {
                "A chave de API não foi configurada no ambiente."
            }
            InsightError::Service(_) => {
                "Ocorreu um erro ao consultar o serviço de análise. Tente novamente mais tarde."
            }
            InsightError::EmptyResponse => "Não foi possível gerar uma resposta clara.",
            InsightError::Cancelled => "A análise foi cancelada.",
        }
    }
}

/// One-shot text generation over an [`InsightRequest`].
pub trait InsightService: Send + Sync {
    fn generate(&self, request: &InsightRequest) -> Result<String, InsightError>;
}

/// Local, deterministic insight built from the snapshot alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineInsightService;

impl InsightService for OfflineInsightService {
    fn generate(&self, request: &InsightRequest) -> Result<String, InsightError> {
        let verdict = match (request.outcome, request.margin_percent) {
            (MonthOutcome::Loss, _) => format!(
                "{}/{} fechou no prejuízo: as despesas ({}) e a taxa de administração ({}) \
                 superaram o faturamento de {}.",
                request.month_label,
                request.year,
                request.total_expenses,
                request.admin_fee_amount,
                request.total_revenue
            ),
            (MonthOutcome::BreakEven, _) => format!(
                "{}/{} empatou: nada sobrou para distribuir depois de despesas e taxa.",
                request.month_label, request.year
            ),
            (MonthOutcome::Profit, Some(margin)) if margin >= 30 => format!(
                "{}/{} foi um bom mês: {}% do faturamento virou lucro líquido.",
                request.month_label, request.year, margin
            ),
            (MonthOutcome::Profit, margin) => format!(
                "{}/{} teve lucro, mas com margem apertada ({}% do faturamento).",
                request.month_label,
                request.year,
                margin.unwrap_or(0)
            ),
        };
        let advice = match request.outcome {
            MonthOutcome::Profit => "Mantenha as despesas fixas sob controle e revise a tarifa nos períodos de alta demanda.",
            _ => "Revise as maiores despesas do mês e avalie ajustar a tarifa diária para cobrir os custos.",
        };
        Ok(format!(
            "{verdict}\n\n{advice}\n\nLucro líquido: {} ({} para cada um dos {} sócios).",
            request.net_profit, request.per_partner_amount, request.partners_count
        ))
    }
}

/// Runs `service` and downgrades every failure to its fallback message.
pub fn request_insight(service: &dyn InsightService, request: &InsightRequest) -> String {
    display(service.generate(request))
}

/// An insight request running on its own thread.
///
/// Dropping or cancelling the task discards the pending response.
pub struct InsightTask {
    receiver: mpsc::Receiver<Result<String, InsightError>>,
    cancelled: Arc<AtomicBool>,
}

impl InsightTask {
    pub fn spawn(service: Arc<dyn InsightService>, request: InsightRequest) -> Self {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            let result = service.generate(&request);
            if !flag.load(Ordering::SeqCst) {
                // The receiver may already be gone.
                let _ = sender.send(result);
            }
        });
        Self {
            receiver,
            cancelled,
        }
    }

    /// The display text if the service has answered, without blocking.
    pub fn try_message(&self) -> Option<String> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(InsightError::Cancelled.fallback_message().to_string());
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(display(result)),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(display(Err(InsightError::Service(
                "insight worker stopped without answering".into(),
            )))),
        }
    }

    /// Blocks for at most `timeout` and returns the display text.
    pub fn wait(self, timeout: Duration) -> String {
        let result = match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.cancelled.store(true, Ordering::SeqCst);
                Err(InsightError::Service(format!(
                    "no answer within {} ms",
                    timeout.as_millis()
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(InsightError::Service(
                "insight worker stopped without answering".into(),
            )),
        };
        display(result)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

fn display(result: Result<String, InsightError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => InsightError::EmptyResponse.fallback_message().to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "insight request failed");
            err.fallback_message().to_string()
        }
    }
}
