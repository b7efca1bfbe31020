use auditum_application::PermissionScope;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Appends a boolean condition restricting `column` to the resources of `scope`.
///
/// The caller is responsible for the surrounding `WHERE`/`AND`.
pub fn push_permission_scope(
    builder: &mut QueryBuilder<'_, Postgres>,
    scope: &PermissionScope,
    column: &str,
) {
    match scope {
        PermissionScope::Unrestricted => {
            builder.push("TRUE");
        }
        PermissionScope::Restricted(resource_ids) if resource_ids.is_empty() => {
            builder.push("FALSE");
        }
        PermissionScope::Restricted(resource_ids) => {
            let resource_ids: Vec<Uuid> = resource_ids.iter().map(|id| id.as_uuid()).collect();
            builder.push(column);
            builder.push(" = ANY(");
            builder.push_bind(resource_ids);
            builder.push(")");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use auditum_application::PermissionScope;
    use auditum_domain::ResourceId;
    use sqlx::{Postgres, QueryBuilder};

    use super::push_permission_scope;

    fn rendered(scope: &PermissionScope) -> String {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT id FROM audits WHERE deleted = FALSE AND ");
        push_permission_scope(&mut builder, scope, "audits.resource_id");
        builder.sql().to_owned()
    }

    #[test]
    fn unrestricted_scope_adds_no_narrowing() {
        assert!(rendered(&PermissionScope::Unrestricted).ends_with("AND TRUE"));
    }

    #[test]
    fn empty_scope_matches_nothing() {
        let sql = rendered(&PermissionScope::Restricted(BTreeSet::new()));
        assert!(sql.ends_with("AND FALSE"));
    }

    #[test]
    fn restricted_scope_binds_resource_ids() {
        let scope = PermissionScope::Restricted(BTreeSet::from([ResourceId::new()]));
        assert!(rendered(&scope).ends_with("AND audits.resource_id = ANY($1)"));
    }
}
