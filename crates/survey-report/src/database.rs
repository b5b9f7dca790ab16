//! MySQL access for survey submissions

use crate::error::{AppError, AppResult};
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Connection, Row};
use survey_common::{ReportError, Stage, SurveyRow, EXPORT_COLUMNS};
use survey_pipeline::Period;
use tracing::{debug, info, instrument};

/// Survey rows of a half-open creation window, oldest first.
///
/// Every column is projected as text so NULLs and numbers arrive as strings.
pub const SURVEY_QUERY: &str = r#"
SELECT
    COALESCE(CAST(l.num_andar AS CHAR), '') AS floor,
    COALESCE(p.nome_paciente, '') AS patient,
    COALESCE(CAST(eq.questao1 AS CHAR), '') AS q1,
    COALESCE(CAST(eq.questao2 AS CHAR), '') AS q2,
    COALESCE(CAST(eq.questao3 AS CHAR), '') AS q3,
    COALESCE(CAST(eq.questao4 AS CHAR), '') AS q4,
    COALESCE(CAST(eq.questao5 AS CHAR), '') AS q5,
    COALESCE(CAST(eq.questao6 AS CHAR), '') AS q6,
    COALESCE(CAST(eq.questao7 AS CHAR), '') AS q7,
    COALESCE(CAST(eq.questao8 AS CHAR), '') AS q8,
    COALESCE(CAST(eq.questao9 AS CHAR), '') AS q9,
    COALESCE(CAST(eq.questao10 AS CHAR), '') AS q10,
    COALESCE(CAST(eq.questao11 AS CHAR), '') AS q11,
    COALESCE(CAST(eq.questao12 AS CHAR), '') AS q12,
    COALESCE(CAST(eq.questao13 AS CHAR), '') AS q13,
    COALESCE(CAST(eq.questao14 AS CHAR), '') AS q14,
    COALESCE(CAST(eq.questao15 AS CHAR), '') AS q15,
    COALESCE(CAST(eq.questao16 AS CHAR), '') AS q16,
    COALESCE(CAST(eq.questao17 AS CHAR), '') AS q17,
    COALESCE(CAST(eq.questao18 AS CHAR), '') AS q18,
    COALESCE(CAST(eq.questao19 AS CHAR), '') AS q19,
    COALESCE(CAST(eq.questao20 AS CHAR), '') AS q20,
    COALESCE(DATE_FORMAT(eq.created, '%Y-%m-%d %H:%i:%s'), '') AS created_at,
    COALESCE(CAST(eq.cadastrador AS CHAR), '') AS recorder
FROM adms_experiencia_questoes AS eq
LEFT JOIN adms_leitos AS l
    ON eq.adms_leito_id = l.id
LEFT JOIN adms_paciente AS p
    ON eq.adms_paciente_id = p.id
WHERE eq.created >= ? AND eq.created < ?
ORDER BY eq.created ASC
"#;

fn database_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| AppError::Stage {
        stage: Stage::Database,
        source: ReportError::connectivity_with_source(context, err),
    }
}

/// Read-only access to survey submissions
pub struct SurveyRepository {
    pool: MySqlPool,
}

impl SurveyRepository {
    /// Opens a single-connection pool and checks the server answers.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn connect(options: MySqlConnectOptions, target: &str) -> AppResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(database_error("connecting to database"))?;

        let mut conn = pool
            .acquire()
            .await
            .map_err(database_error("acquiring connection"))?;
        conn.ping().await.map_err(database_error("pinging database"))?;
        drop(conn);

        info!("database connection established");
        Ok(Self { pool })
    }

    /// Streams the rows of `period` into `on_row`, in creation order.
    ///
    /// Errors from `on_row` stop the stream and are returned as-is.
    #[instrument(skip_all, fields(period = %period))]
    pub async fn stream_rows<F>(&self, period: &Period, mut on_row: F) -> AppResult<u64>
    where
        F: FnMut(SurveyRow) -> AppResult<()>,
    {
        let (start, end) = period.local_bounds();
        debug!(%start, %end, "querying survey rows");

        let mut rows = sqlx::query(SURVEY_QUERY)
            .bind(start)
            .bind(end)
            .fetch(&self.pool);

        let mut fetched = 0u64;
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(database_error("reading survey rows"))?
        {
            on_row(decode_row(&row)?)?;
            fetched += 1;
        }

        info!(fetched, "survey rows streamed");
        Ok(fetched)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &MySqlRow) -> AppResult<SurveyRow> {
    let fields = (0..EXPORT_COLUMNS)
        .map(|index| {
            row.try_get::<Option<String>, _>(index)
                .map(Option::unwrap_or_default)
        })
        .collect::<Result<Vec<String>, sqlx::Error>>()
        .map_err(database_error("decoding survey row"))?;
    Ok(SurveyRow::from_record(fields.iter().map(String::as_str)))
}
