/// The 34-verb command set the dispatcher's handler table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Register,
    Reconnect,
    Ping,
    SessionInfo,
    ClientShutdown,
    RouteAdd,
    RouteAddBulk,
    RouteUpdate,
    RouteRemove,
    RouteList,
    HeadersSet,
    HeadersRemove,
    OptionsSet,
    OptionsRemove,
    HealthSet,
    RatelimitSet,
    CircuitBreakerSet,
    CircuitBreakerStatus,
    CircuitBreakerReset,
    ConfigValidate,
    ConfigApply,
    ConfigRollback,
    ConfigDiff,
    ConfigApplyPartial,
    DrainStart,
    DrainStatus,
    DrainCancel,
    MaintEnter,
    MaintExit,
    MaintStatus,
    StatsGet,
    BackendTest,
    Subscribe,
    Unsubscribe,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Register => "REGISTER",
            Verb::Reconnect => "RECONNECT",
            Verb::Ping => "PING",
            Verb::SessionInfo => "SESSION_INFO",
            Verb::ClientShutdown => "CLIENT_SHUTDOWN",
            Verb::RouteAdd => "ROUTE_ADD",
            Verb::RouteAddBulk => "ROUTE_ADD_BULK",
            Verb::RouteUpdate => "ROUTE_UPDATE",
            Verb::RouteRemove => "ROUTE_REMOVE",
            Verb::RouteList => "ROUTE_LIST",
            Verb::HeadersSet => "HEADERS_SET",
            Verb::HeadersRemove => "HEADERS_REMOVE",
            Verb::OptionsSet => "OPTIONS_SET",
            Verb::OptionsRemove => "OPTIONS_REMOVE",
            Verb::HealthSet => "HEALTH_SET",
            Verb::RatelimitSet => "RATELIMIT_SET",
            Verb::CircuitBreakerSet => "CIRCUIT_BREAKER_SET",
            Verb::CircuitBreakerStatus => "CIRCUIT_BREAKER_STATUS",
            Verb::CircuitBreakerReset => "CIRCUIT_BREAKER_RESET",
            Verb::ConfigValidate => "CONFIG_VALIDATE",
            Verb::ConfigApply => "CONFIG_APPLY",
            Verb::ConfigRollback => "CONFIG_ROLLBACK",
            Verb::ConfigDiff => "CONFIG_DIFF",
            Verb::ConfigApplyPartial => "CONFIG_APPLY_PARTIAL",
            Verb::DrainStart => "DRAIN_START",
            Verb::DrainStatus => "DRAIN_STATUS",
            Verb::DrainCancel => "DRAIN_CANCEL",
            Verb::MaintEnter => "MAINT_ENTER",
            Verb::MaintExit => "MAINT_EXIT",
            Verb::MaintStatus => "MAINT_STATUS",
            Verb::StatsGet => "STATS_GET",
            Verb::BackendTest => "BACKEND_TEST",
            Verb::Subscribe => "SUBSCRIBE",
            Verb::Unsubscribe => "UNSUBSCRIBE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "REGISTER" => Verb::Register,
            "RECONNECT" => Verb::Reconnect,
            "PING" => Verb::Ping,
            "SESSION_INFO" => Verb::SessionInfo,
            "CLIENT_SHUTDOWN" => Verb::ClientShutdown,
            "ROUTE_ADD" => Verb::RouteAdd,
            "ROUTE_ADD_BULK" => Verb::RouteAddBulk,
            "ROUTE_UPDATE" => Verb::RouteUpdate,
            "ROUTE_REMOVE" => Verb::RouteRemove,
            "ROUTE_LIST" => Verb::RouteList,
            "HEADERS_SET" => Verb::HeadersSet,
            "HEADERS_REMOVE" => Verb::HeadersRemove,
            "OPTIONS_SET" => Verb::OptionsSet,
            "OPTIONS_REMOVE" => Verb::OptionsRemove,
            "HEALTH_SET" => Verb::HealthSet,
            "RATELIMIT_SET" => Verb::RatelimitSet,
            "CIRCUIT_BREAKER_SET" => Verb::CircuitBreakerSet,
            "CIRCUIT_BREAKER_STATUS" => Verb::CircuitBreakerStatus,
            "CIRCUIT_BREAKER_RESET" => Verb::CircuitBreakerReset,
            "CONFIG_VALIDATE" => Verb::ConfigValidate,
            "CONFIG_APPLY" => Verb::ConfigApply,
            "CONFIG_ROLLBACK" => Verb::ConfigRollback,
            "CONFIG_DIFF" => Verb::ConfigDiff,
            "CONFIG_APPLY_PARTIAL" => Verb::ConfigApplyPartial,
            "DRAIN_START" => Verb::DrainStart,
            "DRAIN_STATUS" => Verb::DrainStatus,
            "DRAIN_CANCEL" => Verb::DrainCancel,
            "MAINT_ENTER" => Verb::MaintEnter,
            "MAINT_EXIT" => Verb::MaintExit,
            "MAINT_STATUS" => Verb::MaintStatus,
            "STATS_GET" => Verb::StatsGet,
            "BACKEND_TEST" => Verb::BackendTest,
            "SUBSCRIBE" => Verb::Subscribe,
            "UNSUBSCRIBE" => Verb::Unsubscribe,
            _ => return None,
        })
    }

    /// Field cap passed to [`crate::frame::split_fields`]: verb + fields,
    /// with the last field treated as a single (possibly `|`-containing)
    /// terminal blob where the command carries structured data.
    pub fn max_fields(&self) -> usize {
        match self {
            Verb::Register => 5,
            Verb::Reconnect | Verb::Ping | Verb::SessionInfo | Verb::ClientShutdown => 2,
            Verb::RouteAdd => 6,
            Verb::RouteAddBulk => 3,
            Verb::RouteUpdate => 4,
            Verb::RouteRemove => 3,
            Verb::RouteList => 2,
            Verb::HeadersSet | Verb::OptionsSet => 3,
            Verb::HeadersRemove | Verb::OptionsRemove => 3,
            Verb::HealthSet | Verb::RatelimitSet | Verb::CircuitBreakerSet => 4,
            Verb::CircuitBreakerStatus | Verb::CircuitBreakerReset => 3,
            Verb::ConfigValidate | Verb::ConfigApply | Verb::ConfigRollback | Verb::ConfigDiff => 2,
            Verb::ConfigApplyPartial => 3,
            Verb::DrainStart => 3,
            Verb::DrainStatus | Verb::DrainCancel => 2,
            Verb::MaintEnter => 4,
            Verb::MaintExit => 3,
            Verb::MaintStatus | Verb::StatsGet => 2,
            Verb::BackendTest => 3,
            Verb::Subscribe => 3,
            Verb::Unsubscribe => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_verb_round_trips_through_its_string() {
        let all = [
            Verb::Register, Verb::Reconnect, Verb::Ping, Verb::SessionInfo, Verb::ClientShutdown,
            Verb::RouteAdd, Verb::RouteAddBulk, Verb::RouteUpdate, Verb::RouteRemove, Verb::RouteList,
            Verb::HeadersSet, Verb::HeadersRemove, Verb::OptionsSet, Verb::OptionsRemove,
            Verb::HealthSet, Verb::RatelimitSet, Verb::CircuitBreakerSet, Verb::CircuitBreakerStatus,
            Verb::CircuitBreakerReset, Verb::ConfigValidate, Verb::ConfigApply, Verb::ConfigRollback,
            Verb::ConfigDiff, Verb::ConfigApplyPartial, Verb::DrainStart, Verb::DrainStatus,
            Verb::DrainCancel, Verb::MaintEnter, Verb::MaintExit, Verb::MaintStatus, Verb::StatsGet,
            Verb::BackendTest, Verb::Subscribe, Verb::Unsubscribe,
        ];
        assert_eq!(all.len(), 34);
        for verb in all {
            assert_eq!(Verb::parse(verb.as_str()), Some(verb));
        }
    }

    #[test]
    fn unknown_verb_returns_none() {
        assert!(Verb::parse("FROB").is_none());
    }

    #[yare::parameterized(
        register = { Verb::Register, 5 },
        route_add = { Verb::RouteAdd, 6 },
        route_add_bulk = { Verb::RouteAddBulk, 3 },
        maint_enter = { Verb::MaintEnter, 4 },
        maint_exit = { Verb::MaintExit, 3 },
        drain_start = { Verb::DrainStart, 3 },
        unsubscribe = { Verb::Unsubscribe, 2 },
    )]
    fn max_fields_matches_the_verb_s_field_count(verb: Verb, expected: usize) {
        assert_eq!(verb.max_fields(), expected);
    }
}
