//! Well-known service names by port and protocol.
//!
//! Purely informational: the name never affects a port's status.

use crate::scanner::Protocol;

/// TCP services, sorted by port.
const TCP_SERVICES: &[(u16, &str)] = &[
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (53, "domain"),
    (80, "http"),
    (88, "kerberos"),
    (110, "pop3"),
    (111, "rpcbind"),
    (135, "msrpc"),
    (139, "netbios-ssn"),
    (143, "imap"),
    (389, "ldap"),
    (443, "https"),
    (445, "microsoft-ds"),
    (465, "smtps"),
    (587, "submission"),
    (636, "ldaps"),
    (873, "rsync"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1433, "mssql"),
    (1521, "oracle"),
    (1883, "mqtt"),
    (2049, "nfs"),
    (2181, "zookeeper"),
    (2375, "docker"),
    (2376, "docker-ssl"),
    (3000, "grafana"),
    (3128, "squid"),
    (3306, "mysql"),
    (3389, "rdp"),
    (5432, "postgresql"),
    (5672, "amqp"),
    (5900, "vnc"),
    (5984, "couchdb"),
    (6379, "redis"),
    (6443, "kubernetes-api"),
    (8000, "http-alt"),
    (8080, "http-proxy"),
    (8443, "https-alt"),
    (8888, "http-alt"),
    (9000, "cslistener"),
    (9042, "cassandra"),
    (9090, "prometheus"),
    (9092, "kafka"),
    (9200, "elasticsearch"),
    (11211, "memcached"),
    (27017, "mongodb"),
];

/// UDP services, sorted by port.
const UDP_SERVICES: &[(u16, &str)] = &[
    (53, "domain"),
    (67, "dhcps"),
    (68, "dhcpc"),
    (69, "tftp"),
    (123, "ntp"),
    (137, "netbios-ns"),
    (138, "netbios-dgm"),
    (161, "snmp"),
    (162, "snmptrap"),
    (500, "isakmp"),
    (514, "syslog"),
    (520, "rip"),
    (1194, "openvpn"),
    (1701, "l2tp"),
    (1812, "radius"),
    (1900, "ssdp"),
    (4500, "ipsec-nat-t"),
    (5060, "sip"),
    (5353, "mdns"),
    (11211, "memcached"),
];

/// Look up the probable service name for a port.
pub fn service_name(port: u16, protocol: Protocol) -> Option<&'static str> {
    let table = match protocol {
        Protocol::Tcp => TCP_SERVICES,
        Protocol::Udp => UDP_SERVICES,
    };

    table
        .binary_search_by_key(&port, |&(p, _)| p)
        .ok()
        .map(|i| table[i].1)
}
