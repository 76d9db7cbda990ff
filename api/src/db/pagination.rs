use sqlx::{QueryBuilder, Sqlite};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Asc,
    Desc,
}

/// Stable ordering for a cursor-paginated listing: one sort column with the
/// row id as tie breaker, both in the same direction.
///
/// The listing's filtered select runs as the `scoped` CTE, and both the
/// cursor lookup and the page read from it, so a cursor only resolves
/// against rows the filter lets through.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Keyset {
    pub column: &'static str,
    pub direction: Direction,
}

impl Keyset {
    pub const fn new(column: &'static str, direction: Direction) -> Self {
        Keyset { column, direction }
    }

    /// Opens the CTE with `select`. Callers push their ` AND ...` filters
    /// next, then call `finish`.
    pub fn begin<'args>(select: &str) -> QueryBuilder<'args, Sqlite> {
        QueryBuilder::new(format!("WITH scoped AS ({}", select))
    }

    /// Closes the CTE and reads one page from it, starting at the cursor row
    /// when there is one and fetching one row past `limit` to detect a next
    /// page. A cursor outside the scoped rows matches nothing.
    pub fn finish(&self, qb: &mut QueryBuilder<'_, Sqlite>, cursor: Option<&str>, limit: usize) {
        let column = self.column;
        let (strict, inclusive, direction) = match self.direction {
            Direction::Desc => ("<", "<=", "DESC"),
            Direction::Asc => (">", ">=", "ASC"),
        };

        qb.push(") SELECT * FROM scoped s WHERE 1 = 1");
        if let Some(cursor) = cursor {
            qb.push(format!(
                " AND (s.{column} {strict} (SELECT {column} FROM scoped WHERE id = "
            ));
            qb.push_bind(cursor.to_string());
            qb.push(format!(
                ") OR (s.{column} = (SELECT {column} FROM scoped WHERE id = "
            ));
            qb.push_bind(cursor.to_string());
            qb.push(format!(") AND s.id {inclusive} "));
            qb.push_bind(cursor.to_string());
            qb.push("))");
        }
        qb.push(format!(
            " ORDER BY s.{column} {direction}, s.id {direction} LIMIT "
        ));
        qb.push_bind((limit + 1) as i64);
    }
}
